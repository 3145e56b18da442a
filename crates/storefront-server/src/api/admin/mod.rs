//! Admin API handlers, mounted behind bearer auth and the rate limiter.
//!
//! - `GET/POST /api/v1/admin/products`                : catalog listing and create
//! - `PATCH/PUT/DELETE /api/v1/admin/products/{code}` : sparse update and delete
//! - `PUT /api/v1/admin/categories`                   : bulk category rename
//! - `GET /api/v1/admin/orders`, `GET /api/v1/admin/stats`: reporting
//! - `POST /api/v1/admin/uploads`                     : base64 image upload

mod products;
mod reports;
mod uploads;

pub(super) use products::{
    create_product, delete_product, list_products, rename_category, update_product,
};
pub(super) use reports::{list_orders, stats};
pub(super) use uploads::upload_image;
