pub struct Icons;

impl Icons {
    pub const CAR: &str = "🚗";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const PERSON: &str = "👤";
    pub const DEL: &str = "🗑️";
    pub const UP: &str = "⬆️";
    pub const PACKAGE: &str = "📦";
    pub const EMPTY: &str = "∅";
}
