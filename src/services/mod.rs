pub mod auth;
pub mod catalog;
pub mod movies;
pub mod onboarding;
pub mod recommendations;
pub mod webhook;
