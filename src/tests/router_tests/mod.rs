mod cma_tests;
mod properties_tests;
mod seller_update_tests;
