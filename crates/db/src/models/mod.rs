pub mod balance_audit;
pub mod bank_account;
pub mod lead;
pub mod transaction;
pub mod transaction_status;
