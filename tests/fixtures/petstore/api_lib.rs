//! @APIVersion 1.0.0
//! @APITitle Pet Store
//! @APIDescription Pets and the orders placed for them
//! @BasePath /api/v1
//! @SubApi Pets [/pets]
//! @SubApi Orders [/orders]

mod handlers;
pub mod params;
