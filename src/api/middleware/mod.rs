//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. CORS: answers preflight requests
//! 2. Cache-Control: every response is `no-store`
//! 3. Access log: records the final status of each request

pub mod access_log;
