mod credential;
mod payment;
