/*
 * Responsibility
 * - Public surface of the middleware layer
 * - gateway: pre-routing filter chain + proxy entrypoint
 * - http: cross-cutting tower layers
 */
pub mod gateway;
pub mod http;
