//! Slot/epoch time types shared by the Clock sysvar and the rest of the
//! runtime (rent collection, epoch-scoped caches).

pub type Slot = u64;
pub type Epoch = u64;
pub type UnixTimestamp = i64;

pub const SYSVAR_CLOCK_STRUCT_LEN: usize = 40;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Clock {
    pub slot: Slot,
    pub epoch_start_timestamp: UnixTimestamp,
    pub epoch: Epoch,
    pub leader_schedule_epoch: Epoch,
    pub unix_timestamp: UnixTimestamp,
}
