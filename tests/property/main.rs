// tests/property/main.rs

mod debounce;
mod supervision;
