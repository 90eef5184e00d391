//! Rental products (event-sourced).
//!
//! A rental product is a lock/space in a market zone: it carries its
//! dimensions, its location (zone, subzone, lock number), the working hours
//! that apply to it and the value type used to match contract income types.

pub mod product;
pub mod working_hours;

pub use product::{
    ActivateProduct, ArchiveProduct, AssignLocation, AssignWorkingHours, CreateProduct,
    Dimensions, DimensionsChanged, LockLocation, ManualChanged, Product, ProductActivated,
    ProductArchived, ProductCommand, ProductCreated, ProductEvent, ProductId, ProductRef,
    LocationAssigned, SetDimensions, SetManual, ValueType, WorkingHoursAssigned,
};
pub use working_hours::{WorkingHours, WorkingHoursId, WorkingHoursKind};
