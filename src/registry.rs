//! Stable numeric ids for driver names and vehicle classes.
//!
//! Ids are assigned insert-if-absent from counters starting at 1 and are
//! never reused while the registry lives. The registry is owned by
//! [`GameData`](crate::GameData) and passed to the scoring record on every
//! update.

use std::collections::HashMap;

/// Id of a driver name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DriverId(pub u32);

impl DriverId {
    /// Laps not tied to a live vehicle, e.g. ones loaded from the cache.
    pub const UNASSIGNED: DriverId = DriverId(0);
}

/// Id of a vehicle class name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub u32);

#[derive(Debug, Default)]
pub struct IdRegistry {
    drivers: HashMap<String, DriverId>,
    classes: HashMap<String, ClassId>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn driver_id(&mut self, name: &str) -> DriverId {
        if let Some(id) = self.drivers.get(name) {
            return *id;
        }
        let id = DriverId(self.drivers.len() as u32 + 1);
        self.drivers.insert(name.to_owned(), id);
        id
    }

    pub fn class_id(&mut self, class: &str) -> ClassId {
        if let Some(id) = self.classes.get(class) {
            return *id;
        }
        let id = ClassId(self.classes.len() as u32 + 1);
        self.classes.insert(class.to_owned(), id);
        id
    }

    /// Look up without assigning.
    pub fn find_driver(&self, name: &str) -> Option<DriverId> {
        self.drivers.get(name).copied()
    }

    pub fn find_class(&self, class: &str) -> Option<ClassId> {
        self.classes.get(class).copied()
    }

    pub fn driver_count(&self) -> usize {
        self.drivers.len()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }
}
