pub mod chain;

pub mod client;

pub mod deployment;

pub mod identicon;

pub mod lore;

pub mod ui;

pub mod wallets;
