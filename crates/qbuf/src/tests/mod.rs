mod property_scan;
mod structs;
mod utils;
