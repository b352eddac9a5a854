pub const GROUP_CREATED: &str = "GROUP_CREATED";
pub const GROUP_DELETED: &str = "GROUP_DELETED";
pub const MEMBER_ADDED: &str = "MEMBER_ADDED";
pub const MEMBER_REMOVED: &str = "MEMBER_REMOVED";
pub const EXPENSE_ADDED: &str = "EXPENSE_ADDED";
pub const SETTLEMENT_REQUESTED: &str = "SETTLEMENT_REQUESTED";
pub const SETTLEMENT_NOTIFIED: &str = "SETTLEMENT_NOTIFIED";
pub const SETTLEMENT_FAILED: &str = "SETTLEMENT_FAILED";

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_GROUP_DESCRIPTION_LENGTH: usize = 500;
pub const MAX_EXPENSE_DESCRIPTION_LENGTH: usize = 255;
