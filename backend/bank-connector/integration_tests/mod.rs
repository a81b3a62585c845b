mod accounts;
mod authorization;
mod bank_api;
mod helpers;
mod payment;
mod registry;
mod transaction_sync;
