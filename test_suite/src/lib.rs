#[cfg(test)]
mod compile;
#[cfg(test)]
mod errors;
#[cfg(test)]
mod mock;
