use crate::params::PetFilter;

pub struct PetHandlers;

impl PetHandlers {
    /// @Title List pets
    /// @Description Lists every pet matching the filter
    /// @Accept json
    /// @Param filter body PetFilter true "Filter"
    /// @Param x-request-id header String false "Request id"
    /// @Success 200 {array} models::Pet "Matching pets"
    /// @Failure 400 {object} models::ApiError "Bad filter"
    /// @Router /pets [post]
    pub fn list(&self, _filter: PetFilter) {}

    /// @Title Get pet
    /// @Param id path i64 true "Pet id"
    /// @Success 200 {object} models::Pet "The pet"
    /// @Failure 404 {object} models::ApiError "No such pet"
    /// @Router /pets/{id} [get]
    pub fn get(&self, _id: i64) {}
}

/// @Title Place order
/// @Accept json
/// @Param order body models::Order true "Order"
/// @Success 201 {object} models::Order "Created"
/// @Router /orders [post]
pub fn place_order() {}

#[cfg(test)]
mod tests {
    /// @Router /hidden [get]
    fn hidden() {}
}
