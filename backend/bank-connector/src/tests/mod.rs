mod bank_api_error;
mod payment;
mod secrets;
mod token_store;
mod transaction_sync;
