use chrono::{DateTime, NaiveDate, Utc};
use csv::{ReaderBuilder, WriterBuilder};
use rand::Rng;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::error::DatabaseError;
use crate::models::appointment::{ActorRole, Appointment, AppointmentStatus};
use crate::models::catalog::{Currency, Provider, Service};
use crate::models::review::{Review, ReviewResponse};
use crate::models::schedule::{Interval, TimeOfDay};

const PROVIDERS_FILE: &str = "barbers.csv";
const SERVICES_FILE: &str = "services.csv";
const APPOINTMENTS_FILE: &str = "appointments.csv";
const REVIEWS_FILE: &str = "reviews.csv";

/// Generates a 24 character hex identifier for new records.
pub fn new_record_id() -> String {
    let bytes: [u8; 12] = rand::thread_rng().gen();
    hex::encode(bytes)
}

fn join_ids(ids: &[String]) -> String {
    ids.join(";")
}

fn split_ids(raw: &str) -> Vec<String> {
    raw.split(';')
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect()
}

// Row layout of barbers.csv
#[derive(Debug, Serialize, Deserialize)]
struct ProviderRecord {
    id: String,
    user_id: String,
    display_name: String,
    bio: Option<String>,
    is_active: bool,
    is_verified: bool,
    availability: String,
    service_ids: String,
}

impl From<&Provider> for ProviderRecord {
    fn from(provider: &Provider) -> Self {
        Self {
            id: provider.id.clone(),
            user_id: provider.user_id.clone(),
            display_name: provider.display_name.clone(),
            bio: provider.bio.clone(),
            is_active: provider.is_active,
            is_verified: provider.is_verified,
            availability: provider.availability.to_string(),
            service_ids: join_ids(&provider.service_ids),
        }
    }
}

impl TryFrom<ProviderRecord> for Provider {
    type Error = DatabaseError;

    fn try_from(record: ProviderRecord) -> Result<Self, Self::Error> {
        let availability = record
            .availability
            .parse()
            .map_err(|e| DatabaseError::Corrupt(format!("barber {}: {}", record.id, e)))?;

        Ok(Provider {
            service_ids: split_ids(&record.service_ids),
            id: record.id,
            user_id: record.user_id,
            display_name: record.display_name,
            bio: record.bio,
            is_active: record.is_active,
            is_verified: record.is_verified,
            availability,
        })
    }
}

// Row layout of services.csv
#[derive(Debug, Serialize, Deserialize)]
struct ServiceRecord {
    id: String,
    name: String,
    description: String,
    duration_minutes: u16,
    price_cents: u64,
    currency: Currency,
    is_active: bool,
    provider_ids: String,
}

impl From<&Service> for ServiceRecord {
    fn from(service: &Service) -> Self {
        Self {
            id: service.id.clone(),
            name: service.name.clone(),
            description: service.description.clone(),
            duration_minutes: service.duration_minutes,
            price_cents: service.price_cents,
            currency: service.currency,
            is_active: service.is_active,
            provider_ids: join_ids(&service.provider_ids),
        }
    }
}

impl From<ServiceRecord> for Service {
    fn from(record: ServiceRecord) -> Self {
        Self {
            provider_ids: split_ids(&record.provider_ids),
            id: record.id,
            name: record.name,
            description: record.description,
            duration_minutes: record.duration_minutes,
            price_cents: record.price_cents,
            currency: record.currency,
            is_active: record.is_active,
        }
    }
}

// Row layout of appointments.csv
#[derive(Debug, Serialize, Deserialize)]
struct AppointmentRecord {
    id: String,
    customer_id: String,
    provider_id: String,
    service_id: String,
    date: NaiveDate,
    start_time: TimeOfDay,
    end_time: TimeOfDay,
    status: AppointmentStatus,
    price_cents: u64,
    currency: Currency,
    customer_notes: Option<String>,
    notes: Option<String>,
    cancellation_reason: Option<String>,
    cancelled_by: Option<ActorRole>,
    cancelled_at: Option<DateTime<Utc>>,
    rescheduled_from: Option<String>,
    rescheduled_to: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&Appointment> for AppointmentRecord {
    fn from(appointment: &Appointment) -> Self {
        Self {
            id: appointment.id.clone(),
            customer_id: appointment.customer_id.clone(),
            provider_id: appointment.provider_id.clone(),
            service_id: appointment.service_id.clone(),
            date: appointment.date,
            start_time: appointment.interval.start(),
            end_time: appointment.interval.end(),
            status: appointment.status,
            price_cents: appointment.price_cents,
            currency: appointment.currency,
            customer_notes: appointment.customer_notes.clone(),
            notes: appointment.notes.clone(),
            cancellation_reason: appointment.cancellation_reason.clone(),
            cancelled_by: appointment.cancelled_by,
            cancelled_at: appointment.cancelled_at,
            rescheduled_from: appointment.rescheduled_from.clone(),
            rescheduled_to: appointment.rescheduled_to.clone(),
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        }
    }
}

impl TryFrom<AppointmentRecord> for Appointment {
    type Error = DatabaseError;

    fn try_from(record: AppointmentRecord) -> Result<Self, Self::Error> {
        let interval = Interval::new(record.start_time, record.end_time)
            .map_err(|e| DatabaseError::Corrupt(format!("appointment {}: {}", record.id, e)))?;

        Ok(Appointment {
            id: record.id,
            customer_id: record.customer_id,
            provider_id: record.provider_id,
            service_id: record.service_id,
            date: record.date,
            interval,
            status: record.status,
            price_cents: record.price_cents,
            currency: record.currency,
            customer_notes: record.customer_notes,
            notes: record.notes,
            cancellation_reason: record.cancellation_reason,
            cancelled_by: record.cancelled_by,
            cancelled_at: record.cancelled_at,
            rescheduled_from: record.rescheduled_from,
            rescheduled_to: record.rescheduled_to,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

// Row layout of reviews.csv
#[derive(Debug, Serialize, Deserialize)]
struct ReviewRecord {
    id: String,
    appointment_id: String,
    customer_id: String,
    provider_id: String,
    service_id: String,
    rating: u8,
    comment: Option<String>,
    #[serde(default)]
    response_text: Option<String>,
    #[serde(default)]
    responded_by: Option<String>,
    #[serde(default)]
    responded_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<&Review> for ReviewRecord {
    fn from(review: &Review) -> Self {
        Self {
            id: review.id.clone(),
            appointment_id: review.appointment_id.clone(),
            customer_id: review.customer_id.clone(),
            provider_id: review.provider_id.clone(),
            service_id: review.service_id.clone(),
            rating: review.rating,
            comment: review.comment.clone(),
            response_text: review.response.as_ref().map(|r| r.text.clone()),
            responded_by: review.response.as_ref().map(|r| r.responded_by.clone()),
            responded_at: review.response.as_ref().map(|r| r.responded_at),
            created_at: review.created_at,
        }
    }
}

impl From<ReviewRecord> for Review {
    fn from(record: ReviewRecord) -> Self {
        let response = match (record.response_text, record.responded_by, record.responded_at) {
            (Some(text), Some(responded_by), Some(responded_at)) => Some(ReviewResponse {
                text,
                responded_by,
                responded_at,
            }),
            _ => None,
        };

        Self {
            id: record.id,
            appointment_id: record.appointment_id,
            customer_id: record.customer_id,
            provider_id: record.provider_id,
            service_id: record.service_id,
            rating: record.rating,
            comment: record.comment,
            response,
            created_at: record.created_at,
        }
    }
}

/// Selection criteria for appointment listings. Unset fields match anything.
#[derive(Debug, Default, Clone)]
pub struct AppointmentFilter {
    pub customer_id: Option<String>,
    pub provider_id: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl AppointmentFilter {
    fn matches(&self, appointment: &Appointment) -> bool {
        self.customer_id
            .as_deref()
            .map_or(true, |id| appointment.customer_id == id)
            && self
                .provider_id
                .as_deref()
                .map_or(true, |id| appointment.provider_id == id)
            && self.status.map_or(true, |s| appointment.status == s)
            && self.date_from.map_or(true, |d| appointment.date >= d)
            && self.date_to.map_or(true, |d| appointment.date <= d)
    }
}

/// CSV-backed document store, one file per collection.
///
/// Every operation holds `file_mutex` for its full read-modify-write cycle,
/// so conflict checks and the writes they guard are serialized. This is what
/// keeps two concurrent bookings from both claiming an overlapping interval.
pub struct DatabaseService {
    data_dir: PathBuf,
    file_mutex: Mutex<()>,
}

impl DatabaseService {
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let data_dir = data_dir.as_ref().to_path_buf();
        if !data_dir.exists() {
            info!("Creating data directory at {}", data_dir.display());
            fs::create_dir_all(&data_dir)?;
        }

        Ok(Self {
            data_dir,
            file_mutex: Mutex::new(()),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, DatabaseError> {
        self.file_mutex
            .lock()
            .map_err(|e| DatabaseError::Lock(e.to_string()))
    }

    fn read_records<T: DeserializeOwned>(&self, file_name: &str) -> Result<Vec<T>, DatabaseError> {
        let path = self.data_dir.join(file_name);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&path)?;
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

        reader
            .deserialize()
            .collect::<Result<Vec<T>, csv::Error>>()
            .map_err(DatabaseError::from)
    }

    // Replaces the whole file; the rename keeps readers from seeing half a write
    fn write_records<T: Serialize>(&self, file_name: &str, records: &[T]) -> Result<(), DatabaseError> {
        let path = self.data_dir.join(file_name);
        let tmp_path = path.with_extension("csv.tmp");

        let mut writer = WriterBuilder::new().has_headers(true).from_path(&tmp_path)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        drop(writer);

        fs::rename(&tmp_path, &path)?;
        debug!("Wrote {} records to {}", records.len(), path.display());
        Ok(())
    }

    fn load_providers(&self) -> Result<Vec<Provider>, DatabaseError> {
        self.read_records::<ProviderRecord>(PROVIDERS_FILE)?
            .into_iter()
            .map(Provider::try_from)
            .collect()
    }

    fn save_providers(&self, providers: &[Provider]) -> Result<(), DatabaseError> {
        let records: Vec<ProviderRecord> = providers.iter().map(ProviderRecord::from).collect();
        self.write_records(PROVIDERS_FILE, &records)
    }

    fn load_services(&self) -> Result<Vec<Service>, DatabaseError> {
        Ok(self
            .read_records::<ServiceRecord>(SERVICES_FILE)?
            .into_iter()
            .map(Service::from)
            .collect())
    }

    fn save_services(&self, services: &[Service]) -> Result<(), DatabaseError> {
        let records: Vec<ServiceRecord> = services.iter().map(ServiceRecord::from).collect();
        self.write_records(SERVICES_FILE, &records)
    }

    fn load_appointments(&self) -> Result<Vec<Appointment>, DatabaseError> {
        self.read_records::<AppointmentRecord>(APPOINTMENTS_FILE)?
            .into_iter()
            .map(Appointment::try_from)
            .collect()
    }

    fn save_appointments(&self, appointments: &[Appointment]) -> Result<(), DatabaseError> {
        let records: Vec<AppointmentRecord> =
            appointments.iter().map(AppointmentRecord::from).collect();
        self.write_records(APPOINTMENTS_FILE, &records)
    }

    fn load_reviews(&self) -> Result<Vec<Review>, DatabaseError> {
        Ok(self
            .read_records::<ReviewRecord>(REVIEWS_FILE)?
            .into_iter()
            .map(Review::from)
            .collect())
    }

    fn save_reviews(&self, reviews: &[Review]) -> Result<(), DatabaseError> {
        let records: Vec<ReviewRecord> = reviews.iter().map(ReviewRecord::from).collect();
        self.write_records(REVIEWS_FILE, &records)
    }

    // Providers

    pub fn list_providers(&self) -> Result<Vec<Provider>, DatabaseError> {
        let _lock = self.lock()?;
        self.load_providers()
    }

    pub fn find_provider(&self, provider_id: &str) -> Result<Option<Provider>, DatabaseError> {
        let _lock = self.lock()?;
        Ok(self
            .load_providers()?
            .into_iter()
            .find(|provider| provider.id == provider_id))
    }

    pub fn find_provider_by_user(&self, user_id: &str) -> Result<Option<Provider>, DatabaseError> {
        let _lock = self.lock()?;
        Ok(self
            .load_providers()?
            .into_iter()
            .find(|provider| provider.user_id == user_id))
    }

    /// Stores a new provider profile; each user may own at most one.
    pub fn insert_provider(&self, provider: Provider) -> Result<Provider, DatabaseError> {
        let _lock = self.lock()?;
        let mut providers = self.load_providers()?;

        if providers.iter().any(|p| p.user_id == provider.user_id) {
            return Err(DatabaseError::Duplicate(format!(
                "Barber profile already exists for user {}",
                provider.user_id
            )));
        }

        providers.push(provider.clone());
        self.save_providers(&providers)?;
        info!("Stored barber profile {} for user {}", provider.id, provider.user_id);
        Ok(provider)
    }

    /// Applies `change` to a provider and persists the result atomically.
    pub fn update_provider<F, E>(&self, provider_id: &str, change: F) -> Result<Provider, E>
    where
        F: FnOnce(&mut Provider) -> Result<(), E>,
        E: From<DatabaseError>,
    {
        let _lock = self.lock()?;
        let mut providers = self.load_providers()?;

        let provider = providers
            .iter_mut()
            .find(|p| p.id == provider_id)
            .ok_or_else(|| DatabaseError::NotFound(format!("Barber {}", provider_id)))?;

        change(provider)?;
        let updated = provider.clone();

        self.save_providers(&providers)?;
        info!("Updated barber profile {}", provider_id);
        Ok(updated)
    }

    // Services

    pub fn list_services(&self) -> Result<Vec<Service>, DatabaseError> {
        let _lock = self.lock()?;
        self.load_services()
    }

    pub fn find_service(&self, service_id: &str) -> Result<Option<Service>, DatabaseError> {
        let _lock = self.lock()?;
        Ok(self
            .load_services()?
            .into_iter()
            .find(|service| service.id == service_id))
    }

    pub fn insert_service(&self, service: Service) -> Result<Service, DatabaseError> {
        let _lock = self.lock()?;
        let mut services = self.load_services()?;
        services.push(service.clone());
        self.save_services(&services)?;
        info!("Stored service {} ({})", service.id, service.name);
        Ok(service)
    }

    /// Applies `change` to a service and persists the result atomically.
    pub fn update_service<F, E>(&self, service_id: &str, change: F) -> Result<Service, E>
    where
        F: FnOnce(&mut Service) -> Result<(), E>,
        E: From<DatabaseError>,
    {
        let _lock = self.lock()?;
        let mut services = self.load_services()?;

        let service = services
            .iter_mut()
            .find(|s| s.id == service_id)
            .ok_or_else(|| DatabaseError::NotFound(format!("Service {}", service_id)))?;

        change(service)?;
        let updated = service.clone();

        self.save_services(&services)?;
        info!("Updated service {} (active {})", service_id, updated.is_active);
        Ok(updated)
    }

    /// Authorizes a provider for a service, updating both sides of the link.
    pub fn assign_provider_to_service(
        &self,
        service_id: &str,
        provider_id: &str,
    ) -> Result<(Service, Provider), DatabaseError> {
        let _lock = self.lock()?;
        let mut services = self.load_services()?;
        let mut providers = self.load_providers()?;

        let service = services
            .iter_mut()
            .find(|s| s.id == service_id)
            .ok_or_else(|| DatabaseError::NotFound(format!("Service {}", service_id)))?;
        let provider = providers
            .iter_mut()
            .find(|p| p.id == provider_id)
            .ok_or_else(|| DatabaseError::NotFound(format!("Barber {}", provider_id)))?;

        if !service.provider_ids.iter().any(|id| id == provider_id) {
            service.provider_ids.push(provider_id.to_string());
        }
        if !provider.offers(service_id) {
            provider.service_ids.push(service_id.to_string());
        }

        let linked = (service.clone(), provider.clone());
        self.save_services(&services)?;
        self.save_providers(&providers)?;

        info!("Barber {} may now perform service {}", provider_id, service_id);
        Ok(linked)
    }

    /// Withdraws a provider from a service on both sides of the link.
    ///
    /// The service must exist; an unknown provider only clears the service side.
    pub fn remove_provider_from_service(
        &self,
        service_id: &str,
        provider_id: &str,
    ) -> Result<Service, DatabaseError> {
        let _lock = self.lock()?;
        let mut services = self.load_services()?;
        let mut providers = self.load_providers()?;

        let service = services
            .iter_mut()
            .find(|s| s.id == service_id)
            .ok_or_else(|| DatabaseError::NotFound(format!("Service {}", service_id)))?;
        service.provider_ids.retain(|id| id != provider_id);
        let unlinked = service.clone();

        if let Some(provider) = providers.iter_mut().find(|p| p.id == provider_id) {
            provider.service_ids.retain(|id| id != service_id);
        }

        self.save_services(&services)?;
        self.save_providers(&providers)?;

        info!("Barber {} no longer performs service {}", provider_id, service_id);
        Ok(unlinked)
    }

    // Appointments

    pub fn find_appointment(&self, appointment_id: &str) -> Result<Option<Appointment>, DatabaseError> {
        let _lock = self.lock()?;
        Ok(self
            .load_appointments()?
            .into_iter()
            .find(|appointment| appointment.id == appointment_id))
    }

    /// Matching appointments ordered by date, then start time.
    pub fn list_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, DatabaseError> {
        let _lock = self.lock()?;
        let mut appointments: Vec<Appointment> = self
            .load_appointments()?
            .into_iter()
            .filter(|appointment| filter.matches(appointment))
            .collect();

        appointments.sort_by_key(|a| (a.date, a.interval.start()));
        Ok(appointments)
    }

    /// Intervals still occupied on `date` for the provider, skipping `exclude`.
    pub fn booked_intervals(
        &self,
        provider_id: &str,
        date: NaiveDate,
        exclude: Option<&str>,
    ) -> Result<Vec<Interval>, DatabaseError> {
        let _lock = self.lock()?;
        let appointments = self.load_appointments()?;
        Ok(occupied_intervals(&appointments, provider_id, date, exclude))
    }

    /// Inserts the appointment unless its interval is already taken.
    ///
    /// The conflict check runs against the stored state while the writer lock
    /// is held, so a stale snapshot seen by the caller cannot lead to a
    /// double booking.
    pub fn insert_appointment_if_free(
        &self,
        appointment: Appointment,
    ) -> Result<Appointment, DatabaseError> {
        let _lock = self.lock()?;
        let mut appointments = self.load_appointments()?;

        let booked = occupied_intervals(
            &appointments,
            &appointment.provider_id,
            appointment.date,
            None,
        );
        if booked.iter().any(|b| b.overlaps(&appointment.interval)) {
            warn!(
                "Rejected appointment for barber {} on {} at {}: slot taken",
                appointment.provider_id, appointment.date, appointment.interval
            );
            return Err(DatabaseError::SlotConflict);
        }

        appointments.push(appointment.clone());
        self.save_appointments(&appointments)?;

        info!(
            "Stored appointment {} for barber {} on {} at {}",
            appointment.id, appointment.provider_id, appointment.date, appointment.interval
        );
        Ok(appointment)
    }

    /// Applies `change` to an appointment and persists the result atomically.
    pub fn update_appointment<F, E>(&self, appointment_id: &str, change: F) -> Result<Appointment, E>
    where
        F: FnOnce(&mut Appointment) -> Result<(), E>,
        E: From<DatabaseError>,
    {
        let _lock = self.lock()?;
        let mut appointments = self.load_appointments()?;

        let appointment = appointments
            .iter_mut()
            .find(|a| a.id == appointment_id)
            .ok_or_else(|| DatabaseError::NotFound(format!("Appointment {}", appointment_id)))?;

        change(appointment)?;
        let updated = appointment.clone();

        self.save_appointments(&appointments)?;
        info!(
            "Updated appointment {} (status {})",
            appointment_id, updated.status
        );
        Ok(updated)
    }

    /// Retires an appointment and books its replacement in one step.
    ///
    /// `retire` re-checks and applies the cancellation on the stored copy of
    /// the original. The replacement's interval is checked against everything
    /// else on its date, ignoring the appointment being replaced. Returns the
    /// retired original and the stored replacement.
    pub fn reschedule_appointment<F, E>(
        &self,
        appointment_id: &str,
        mut replacement: Appointment,
        retire: F,
    ) -> Result<(Appointment, Appointment), E>
    where
        F: FnOnce(&mut Appointment) -> Result<(), E>,
        E: From<DatabaseError>,
    {
        let _lock = self.lock()?;
        let mut appointments = self.load_appointments()?;

        let booked = occupied_intervals(
            &appointments,
            &replacement.provider_id,
            replacement.date,
            Some(appointment_id),
        );
        let conflict = booked.iter().any(|b| b.overlaps(&replacement.interval));

        let original = appointments
            .iter_mut()
            .find(|a| a.id == appointment_id)
            .ok_or_else(|| DatabaseError::NotFound(format!("Appointment {}", appointment_id)))?;

        retire(original)?;
        if conflict {
            return Err(DatabaseError::SlotConflict.into());
        }

        original.rescheduled_to = Some(replacement.id.clone());
        replacement.rescheduled_from = Some(original.id.clone());
        let retired = original.clone();

        appointments.push(replacement.clone());
        self.save_appointments(&appointments)?;

        info!(
            "Rescheduled appointment {} to {} on {} at {}",
            retired.id, replacement.id, replacement.date, replacement.interval
        );
        Ok((retired, replacement))
    }

    // Reviews

    /// Stores a review; each appointment may be reviewed once.
    pub fn insert_review(&self, review: Review) -> Result<Review, DatabaseError> {
        let _lock = self.lock()?;
        let mut reviews = self.load_reviews()?;

        if reviews
            .iter()
            .any(|r| r.appointment_id == review.appointment_id)
        {
            return Err(DatabaseError::Duplicate(format!(
                "Appointment {} has already been reviewed",
                review.appointment_id
            )));
        }

        reviews.push(review.clone());
        self.save_reviews(&reviews)?;

        info!(
            "Stored review {} for appointment {}",
            review.id, review.appointment_id
        );
        Ok(review)
    }

    pub fn find_review(&self, review_id: &str) -> Result<Option<Review>, DatabaseError> {
        let _lock = self.lock()?;
        Ok(self
            .load_reviews()?
            .into_iter()
            .find(|review| review.id == review_id))
    }

    /// Applies `change` to a review and persists the result atomically.
    pub fn update_review<F, E>(&self, review_id: &str, change: F) -> Result<Review, E>
    where
        F: FnOnce(&mut Review) -> Result<(), E>,
        E: From<DatabaseError>,
    {
        let _lock = self.lock()?;
        let mut reviews = self.load_reviews()?;

        let review = reviews
            .iter_mut()
            .find(|r| r.id == review_id)
            .ok_or_else(|| DatabaseError::NotFound(format!("Review {}", review_id)))?;

        change(review)?;
        let updated = review.clone();

        self.save_reviews(&reviews)?;
        info!("Updated review {}", review_id);
        Ok(updated)
    }

    /// Reviews for a provider, newest first.
    pub fn list_reviews_for_provider(&self, provider_id: &str) -> Result<Vec<Review>, DatabaseError> {
        let _lock = self.lock()?;
        let mut reviews: Vec<Review> = self
            .load_reviews()?
            .into_iter()
            .filter(|review| review.provider_id == provider_id)
            .collect();

        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }
}

fn occupied_intervals(
    appointments: &[Appointment],
    provider_id: &str,
    date: NaiveDate,
    exclude: Option<&str>,
) -> Vec<Interval> {
    appointments
        .iter()
        .filter(|a| a.provider_id == provider_id && a.date == date)
        .filter(|a| a.status.occupies_slot())
        .filter(|a| exclude != Some(a.id.as_str()))
        .map(|a| a.interval)
        .collect()
}

// Create the shared database service rooted at `data_dir`
pub fn create_database_service(data_dir: &Path) -> Result<Arc<DatabaseService>, DatabaseError> {
    let service = DatabaseService::new(data_dir)?;
    info!("Database service initialized at {}", data_dir.display());
    Ok(Arc::new(service))
}
