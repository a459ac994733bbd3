//! Host-side pieces shared by the front ends: command line options and program image loading.

pub mod cli;
pub mod image;
