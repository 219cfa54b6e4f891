//! Machine registry for automatic front-end discovery.
//!
//! Each bench board self-registers via [`inventory::submit!`] with a
//! [`MachineEntry`] containing its CLI name, a one-line description and a
//! factory function. The front-end discovers available boards at runtime
//! without any central list.

use tstate_core::core::machine::Machine;
use tstate_core::cpu::z80::Quirks;

/// Describes a front-end-capable board.
pub struct MachineEntry {
    /// CLI name used to select this board (e.g., "flat").
    pub name: &'static str,
    /// Shown by `tstate machines`.
    pub description: &'static str,
    /// Factory: construct a powered-down board whose CPU uses `quirks`.
    pub create: fn(Quirks) -> Box<dyn Machine>,
}

impl MachineEntry {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        create: fn(Quirks) -> Box<dyn Machine>,
    ) -> Self {
        Self {
            name,
            description,
            create,
        }
    }
}

inventory::collect!(MachineEntry);

/// Return all registered boards, sorted by name.
pub fn all() -> Vec<&'static MachineEntry> {
    let mut entries: Vec<_> = inventory::iter::<MachineEntry>.into_iter().collect();
    entries.sort_by_key(|e| e.name);
    entries
}

/// Look up a board by its CLI name.
pub fn find(name: &str) -> Option<&'static MachineEntry> {
    inventory::iter::<MachineEntry>
        .into_iter()
        .find(|e| e.name == name)
}
