pub mod coordinator;
pub mod embed;
pub mod presign;
pub mod registrar;
pub mod tally;
pub mod transfer;
