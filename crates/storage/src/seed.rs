use herd_core::Veterinarian;

/// Starter directory used to populate an empty store.
pub fn demo_directory() -> Vec<Veterinarian> {
    vec![
        vet(
            "1",
            "Dr. Ram Bahadur Thapa",
            "BVSc, MVSc",
            "Ruminants",
            "15 years",
            4.8,
            800,
            "Kathmandu",
            "Thamel, Kathmandu",
            &["09:00 AM", "10:00 AM", "02:00 PM", "03:00 PM"],
        ),
        vet(
            "2",
            "Dr. Sita Devi Sharma",
            "BVSc",
            "General Practice",
            "8 years",
            4.6,
            600,
            "Lalitpur",
            "Patan, Lalitpur",
            &["11:00 AM", "12:00 PM", "04:00 PM", "05:00 PM"],
        ),
        vet(
            "3",
            "Dr. Hari Prasad Karki",
            "BVSc, MVSc, PhD",
            "Poultry",
            "20 years",
            4.9,
            1000,
            "Bhaktapur",
            "Bhaktapur Durbar Square",
            &["08:00 AM", "09:00 AM", "01:00 PM", "02:00 PM"],
        ),
        vet(
            "4",
            "Dr. Gita Kumari Tamang",
            "BVSc",
            "Ruminants",
            "12 years",
            4.7,
            700,
            "Kathmandu",
            "Baneshwor, Kathmandu",
            &["10:00 AM", "11:00 AM", "03:00 PM", "04:00 PM"],
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn vet(
    id: &str,
    name: &str,
    qualification: &str,
    specialization: &str,
    experience: &str,
    rating: f32,
    appointment_fee: u32,
    location: &str,
    clinic_address: &str,
    slots: &[&str],
) -> Veterinarian {
    Veterinarian {
        id: id.to_string(),
        name: name.to_string(),
        qualification: qualification.to_string(),
        specialization: specialization.to_string(),
        experience: experience.to_string(),
        rating,
        appointment_fee,
        location: location.to_string(),
        clinic_address: clinic_address.to_string(),
        available_slots: slots.iter().map(ToString::to_string).collect(),
    }
}
