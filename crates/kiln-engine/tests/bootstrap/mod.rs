mod extension_tests;
mod source_tests;
mod validation_tests;
