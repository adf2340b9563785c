pub mod approval;
pub mod boa_request;
