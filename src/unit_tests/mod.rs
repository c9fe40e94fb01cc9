#[cfg(test)]
mod dispatcher_tests;
#[cfg(test)]
mod sim_tests;
