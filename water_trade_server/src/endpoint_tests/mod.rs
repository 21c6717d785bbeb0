mod helpers;
mod mocks;
mod notifications;
mod trades;
