//! Identifiers and handles used to link IR entities together.

/// Cross-reference identifier. Generated while building the operation graph to
/// link together IR operations and views which need to reference each other.
/// Identifiers are unique within a job and never reused; resolution is always
/// a lookup in the job's view arena, never an embedded pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct XrefId(pub u32);

/// Index into the job's shared `consts` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstIndex(pub usize);

/// Slot handle for operations that consume data slots.
///
/// Starts out unassigned; the slot allocation phase fills it in. Slot numbers
/// are static addresses within the owning view's data array and never depend
/// on runtime reachability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SlotHandle {
    pub slot: Option<u32>,
}

impl SlotHandle {
    pub fn new() -> Self {
        SlotHandle { slot: None }
    }

    pub fn with_slot(slot: u32) -> Self {
        SlotHandle { slot: Some(slot) }
    }
}
