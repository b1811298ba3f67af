fn main() {
    // Host builds need no link-time setup; the ESP-IDF sysenv is only
    // emitted when building for the device.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
