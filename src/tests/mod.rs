pub mod case5;
