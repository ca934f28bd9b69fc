pub mod net;
pub mod room;
pub mod run;

#[cfg(test)]
mod test_helpers;
