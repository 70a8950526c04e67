#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // We fuzz TOML parsing of ScheduleFile and ensure it never panics and
    // rejects invalids gracefully. Both parse errors and validation errors
    // are acceptable; panics are not.
    let parsed = toml::from_str::<dispenser_config::ScheduleFile>(data);
    match parsed {
        Ok(file) => {
            // Ensure validate() does not panic
            let _ = file.validate();
        }
        Err(_e) => {
            // parse error is acceptable
        }
    }
});
