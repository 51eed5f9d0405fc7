pub mod approval;
pub mod payment;
pub mod role;
pub mod storage;
pub mod submission_type;

pub use approval::ApprovalStatus;
pub use payment::PaymentStatus;
pub use role::Role;
pub use submission_type::SubmissionType;
