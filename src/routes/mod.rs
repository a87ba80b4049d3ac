/**
 * Routes Module
 * HTTP handlers, grouped by surface
 */
pub mod admin;
pub mod authors;
pub mod blog;
pub mod health;
pub mod leads;
pub mod proxy;
pub mod site;
pub mod sitemap;
