/**
 * Routes Module
 * API route handlers
 */

pub mod auth;
pub mod blog;
pub mod cms;
pub mod contact;
pub mod health;
pub mod portfolio;
pub mod rss;
