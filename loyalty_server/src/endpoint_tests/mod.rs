mod balance;
mod helpers;
mod orders;
