use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use acm_core::{Aggregate, AggregateRoot, DomainError, ValueObject, define_id};
use acm_events::Event;
use acm_zones::ZoneRef;

use crate::working_hours::{WorkingHours, WorkingHoursKind};

define_id!(
    /// Product identifier.
    ProductId
);

/// Billing category of a product, matched against contract income types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Rent,
    LumpSumRent,
    SecurityDeposit,
    Transfer,
}

/// Leasable surface of a lock. `area` is always `width * length` unless the
/// dimensions were reset by switching the product to manual.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub length: f64,
    pub area: f64,
}

impl Dimensions {
    pub fn from_sides(width: f64, length: f64) -> Self {
        Self {
            width,
            length,
            area: width * length,
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

impl ValueObject for Dimensions {}

/// Where a lock sits in the market.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LockLocation {
    pub zone: Option<ZoneRef>,
    pub subzone: Option<String>,
    pub lock_number: Option<String>,
}

impl LockLocation {
    /// `ZONE-SUBZONE-LOCK`, skipping the parts that are unset or empty
    /// (e.g. `1A-001`, `1F-T-001`).
    pub fn display_name(&self) -> String {
        let zone = self.zone.as_ref().map(|z| z.name.as_str());
        [zone, self.subzone.as_deref(), self.lock_number.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }
}

/// Snapshot of the product fields contracts and invoices need.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: ProductId,
    pub name: String,
    pub value_type: Option<ValueType>,
}

/// Aggregate root: rental Product.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    id: ProductId,
    name: String,
    value_type: Option<ValueType>,
    dimensions: Dimensions,
    location: LockLocation,
    working_hours: Option<WorkingHours>,
    non_working_hours: Option<WorkingHours>,
    manual: bool,
    active: bool,
    inactive_date: Option<NaiveDate>,
    version: u64,
    created: bool,
}

impl Product {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: ProductId) -> Self {
        Self {
            id,
            name: String::new(),
            value_type: None,
            dimensions: Dimensions::zero(),
            location: LockLocation::default(),
            working_hours: None,
            non_working_hours: None,
            manual: false,
            active: true,
            inactive_date: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> Option<ValueType> {
        self.value_type
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn location(&self) -> &LockLocation {
        &self.location
    }

    pub fn working_hours(&self) -> Option<&WorkingHours> {
        self.working_hours.as_ref()
    }

    pub fn non_working_hours(&self) -> Option<&WorkingHours> {
        self.non_working_hours.as_ref()
    }

    pub fn is_manual(&self) -> bool {
        self.manual
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Date the product was archived; `None` while active.
    pub fn inactive_date(&self) -> Option<NaiveDate> {
        self.inactive_date
    }

    pub fn to_ref(&self) -> ProductRef {
        ProductRef {
            id: self.id,
            name: self.name.clone(),
            value_type: self.value_type,
        }
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateProduct.
///
/// An empty `name` is replaced by the location's display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateProduct {
    pub product_id: ProductId,
    pub name: String,
    pub value_type: Option<ValueType>,
    pub width: f64,
    pub length: f64,
    pub location: LockLocation,
    pub working_hours: Option<WorkingHours>,
    pub non_working_hours: Option<WorkingHours>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetDimensions (area follows width and length).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetDimensions {
    pub product_id: ProductId,
    pub width: f64,
    pub length: f64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetManual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetManual {
    pub product_id: ProductId,
    pub manual: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AssignLocation (renames the product).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignLocation {
    pub product_id: ProductId,
    pub location: LockLocation,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AssignWorkingHours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignWorkingHours {
    pub product_id: ProductId,
    pub working_hours: Option<WorkingHours>,
    pub non_working_hours: Option<WorkingHours>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ArchiveProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveProduct {
    pub product_id: ProductId,
    /// Business date recorded as the inactive date.
    pub archived_on: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ActivateProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateProduct {
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProductCommand {
    CreateProduct(CreateProduct),
    SetDimensions(SetDimensions),
    SetManual(SetManual),
    AssignLocation(AssignLocation),
    AssignWorkingHours(AssignWorkingHours),
    ArchiveProduct(ArchiveProduct),
    ActivateProduct(ActivateProduct),
}

/// Event: ProductCreated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCreated {
    pub product_id: ProductId,
    pub name: String,
    pub value_type: Option<ValueType>,
    pub dimensions: Dimensions,
    pub location: LockLocation,
    pub working_hours: Option<WorkingHours>,
    pub non_working_hours: Option<WorkingHours>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DimensionsChanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionsChanged {
    pub product_id: ProductId,
    pub dimensions: Dimensions,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ManualChanged. Dimensions are reset to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualChanged {
    pub product_id: ProductId,
    pub manual: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LocationAssigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationAssigned {
    pub product_id: ProductId,
    pub location: LockLocation,
    pub name: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: WorkingHoursAssigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHoursAssigned {
    pub product_id: ProductId,
    pub working_hours: Option<WorkingHours>,
    pub non_working_hours: Option<WorkingHours>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductArchived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductArchived {
    pub product_id: ProductId,
    pub inactive_date: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductActivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductActivated {
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProductEvent {
    ProductCreated(ProductCreated),
    DimensionsChanged(DimensionsChanged),
    ManualChanged(ManualChanged),
    LocationAssigned(LocationAssigned),
    WorkingHoursAssigned(WorkingHoursAssigned),
    ProductArchived(ProductArchived),
    ProductActivated(ProductActivated),
}

impl Event for ProductEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::ProductCreated(_) => "products.product.created",
            ProductEvent::DimensionsChanged(_) => "products.product.dimensions_changed",
            ProductEvent::ManualChanged(_) => "products.product.manual_changed",
            ProductEvent::LocationAssigned(_) => "products.product.location_assigned",
            ProductEvent::WorkingHoursAssigned(_) => "products.product.working_hours_assigned",
            ProductEvent::ProductArchived(_) => "products.product.archived",
            ProductEvent::ProductActivated(_) => "products.product.activated",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProductEvent::ProductCreated(e) => e.occurred_at,
            ProductEvent::DimensionsChanged(e) => e.occurred_at,
            ProductEvent::ManualChanged(e) => e.occurred_at,
            ProductEvent::LocationAssigned(e) => e.occurred_at,
            ProductEvent::WorkingHoursAssigned(e) => e.occurred_at,
            ProductEvent::ProductArchived(e) => e.occurred_at,
            ProductEvent::ProductActivated(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Product {
    type Command = ProductCommand;
    type Event = ProductEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ProductEvent::ProductCreated(e) => {
                self.id = e.product_id;
                self.name = e.name.clone();
                self.value_type = e.value_type;
                self.dimensions = e.dimensions;
                self.location = e.location.clone();
                self.working_hours = e.working_hours.clone();
                self.non_working_hours = e.non_working_hours.clone();
                self.active = true;
                self.created = true;
            }
            ProductEvent::DimensionsChanged(e) => {
                self.dimensions = e.dimensions;
            }
            ProductEvent::ManualChanged(e) => {
                self.manual = e.manual;
                self.dimensions = Dimensions::zero();
            }
            ProductEvent::LocationAssigned(e) => {
                self.location = e.location.clone();
                self.name = e.name.clone();
            }
            ProductEvent::WorkingHoursAssigned(e) => {
                self.working_hours = e.working_hours.clone();
                self.non_working_hours = e.non_working_hours.clone();
            }
            ProductEvent::ProductArchived(e) => {
                self.active = false;
                self.inactive_date = Some(e.inactive_date);
            }
            ProductEvent::ProductActivated(_) => {
                self.active = true;
                self.inactive_date = None;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ProductCommand::CreateProduct(cmd) => self.handle_create(cmd),
            ProductCommand::SetDimensions(cmd) => self.handle_set_dimensions(cmd),
            ProductCommand::SetManual(cmd) => self.handle_set_manual(cmd),
            ProductCommand::AssignLocation(cmd) => self.handle_assign_location(cmd),
            ProductCommand::AssignWorkingHours(cmd) => self.handle_assign_working_hours(cmd),
            ProductCommand::ArchiveProduct(cmd) => self.handle_archive(cmd),
            ProductCommand::ActivateProduct(cmd) => self.handle_activate(cmd),
        }
    }
}

fn validate_sides(width: f64, length: f64) -> Result<Dimensions, DomainError> {
    if !width.is_finite() || !length.is_finite() || width < 0.0 || length < 0.0 {
        return Err(DomainError::validation(
            "width and length must be non-negative numbers",
        ));
    }
    Ok(Dimensions::from_sides(width, length))
}

fn validate_schedules(
    working_hours: Option<&WorkingHours>,
    non_working_hours: Option<&WorkingHours>,
) -> Result<(), DomainError> {
    if working_hours.is_some_and(|h| h.kind != WorkingHoursKind::InTime) {
        return Err(DomainError::validation(
            "working hours must be an in-time schedule",
        ));
    }
    if non_working_hours.is_some_and(|h| h.kind != WorkingHoursKind::OutTime) {
        return Err(DomainError::validation(
            "not working hours must be an out-time schedule",
        ));
    }
    Ok(())
}

impl Product {
    fn ensure_exists(&self, product_id: ProductId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found(format!("product {product_id}")));
        }
        if self.id != product_id {
            return Err(DomainError::invariant("product_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateProduct) -> Result<Vec<ProductEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("product already exists"));
        }

        let name = if cmd.name.trim().is_empty() {
            cmd.location.display_name()
        } else {
            cmd.name.trim().to_string()
        };
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        let dimensions = validate_sides(cmd.width, cmd.length)?;
        validate_schedules(cmd.working_hours.as_ref(), cmd.non_working_hours.as_ref())?;

        // Name uniqueness is a catalog-wide rule; the host checks it before dispatching.
        Ok(vec![ProductEvent::ProductCreated(ProductCreated {
            product_id: cmd.product_id,
            name,
            value_type: cmd.value_type,
            dimensions,
            location: cmd.location.clone(),
            working_hours: cmd.working_hours.clone(),
            non_working_hours: cmd.non_working_hours.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_dimensions(&self, cmd: &SetDimensions) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_exists(cmd.product_id)?;
        let dimensions = validate_sides(cmd.width, cmd.length)?;

        Ok(vec![ProductEvent::DimensionsChanged(DimensionsChanged {
            product_id: cmd.product_id,
            dimensions,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_manual(&self, cmd: &SetManual) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_exists(cmd.product_id)?;
        if self.manual == cmd.manual {
            return Ok(vec![]);
        }

        Ok(vec![ProductEvent::ManualChanged(ManualChanged {
            product_id: cmd.product_id,
            manual: cmd.manual,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_assign_location(&self, cmd: &AssignLocation) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_exists(cmd.product_id)?;
        let name = cmd.location.display_name();
        if name.is_empty() {
            return Err(DomainError::validation(
                "location needs a zone, a subzone or a lock number",
            ));
        }

        Ok(vec![ProductEvent::LocationAssigned(LocationAssigned {
            product_id: cmd.product_id,
            location: cmd.location.clone(),
            name,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_assign_working_hours(
        &self,
        cmd: &AssignWorkingHours,
    ) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_exists(cmd.product_id)?;
        validate_schedules(cmd.working_hours.as_ref(), cmd.non_working_hours.as_ref())?;

        Ok(vec![ProductEvent::WorkingHoursAssigned(WorkingHoursAssigned {
            product_id: cmd.product_id,
            working_hours: cmd.working_hours.clone(),
            non_working_hours: cmd.non_working_hours.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_archive(&self, cmd: &ArchiveProduct) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_exists(cmd.product_id)?;
        if !self.active {
            return Err(DomainError::conflict("product is already archived"));
        }

        Ok(vec![ProductEvent::ProductArchived(ProductArchived {
            product_id: cmd.product_id,
            inactive_date: cmd.archived_on,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_activate(&self, cmd: &ActivateProduct) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_exists(cmd.product_id)?;
        if self.active {
            return Err(DomainError::conflict("product is already active"));
        }

        Ok(vec![ProductEvent::ProductActivated(ProductActivated {
            product_id: cmd.product_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
