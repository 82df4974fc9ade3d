/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: passphrase gate / http: transport 共通の layer
 */
pub mod auth;
pub mod http;
