// End-to-end tests for the chat quota backend.
//
// A single testcontainers PostgreSQL instance is shared by the whole suite.
// Every test leases its own database (test_db_<uuid>) from a pool, and the
// upstream chat provider is replaced by a local axum server that replies with
// canned SSE frames.

mod test_chat;
mod test_health;
