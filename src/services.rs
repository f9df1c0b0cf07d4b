pub mod permission_resolver;
pub mod session_store;
pub use session_store::{AuthStatus, SessionContext, SessionStore, SessionToken};
pub mod auth_gate;
pub use auth_gate::AuthGate;
pub mod auth;
pub use auth::AuthService;
pub mod rbac_service;
pub use rbac_service::RbacService;
pub mod register_session;
pub use register_session::RegisterSessionMachine;
pub mod workflow;
pub use workflow::{CountWorkflow, DocumentWorkflow, ReturnWorkflow, TransferWorkflow};
