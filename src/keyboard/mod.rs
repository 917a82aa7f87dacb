pub mod emulator;
pub mod layout;
