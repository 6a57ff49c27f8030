/// Longest weekly series a single repeating request may create.
pub const MAX_REPEAT_WEEKS: u32 = 52;

pub const MAX_RESERVED_BY_LEN: usize = 100;
pub const MAX_NOTE_LEN: usize = 500;
