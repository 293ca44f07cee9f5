mod job_tests;
mod router_tests;
mod utils;
