// Module exports for pure logic
pub mod evaluation;   // Result pane rendering
pub mod manager;      // Store-backed tab operations
pub mod tabs;         // Tab list transforms
