pub mod contract_tests;
