//! Last-restart-slot sysvar: the slot the cluster most recently restarted
//! from, exposed so programs can detect a hard fork they lived through.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LastRestartSlot {
    pub last_restart_slot: u64,
}
