// Time handling: clock source and simulation
pub mod simulate;
pub mod source;
