//! Epoch-schedule sysvar payload: maps slots to epochs.

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EpochSchedule {
    pub slots_per_epoch: u64,
    pub leader_schedule_slot_offset: u64,
    pub warmup: bool,
    pub first_normal_epoch: u64,
    pub first_normal_slot: u64,
}

impl Default for EpochSchedule {
    fn default() -> Self {
        Self {
            slots_per_epoch: 432_000,
            leader_schedule_slot_offset: 432_000,
            warmup: false,
            first_normal_epoch: 0,
            first_normal_slot: 0,
        }
    }
}

impl EpochSchedule {
    pub fn get_epoch(&self, slot: u64) -> u64 {
        if self.slots_per_epoch == 0 {
            return 0;
        }
        if slot < self.first_normal_slot || self.warmup {
            slot.saturating_div(self.slots_per_epoch)
        } else {
            let slot_index = slot.saturating_sub(self.first_normal_slot);
            self.first_normal_epoch
                .saturating_add(slot_index.saturating_div(self.slots_per_epoch))
        }
    }
}
