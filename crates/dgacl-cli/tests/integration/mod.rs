mod binary;
mod config;
mod verbs;
