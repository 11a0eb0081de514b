//! Attendance-code issuance and redemption.
//!
//! Short-lived, single-use codes: a teacher issues one per classroom, students
//! redeem it exactly once per classroom per day, and the session auto-closes
//! once every eligible student has redeemed it. All coordination state lives
//! in the store; workers share nothing in-process.

pub mod code;
pub mod completion;
pub mod redeem;
pub mod session;
