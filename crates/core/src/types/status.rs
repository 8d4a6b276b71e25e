//! Choice enums stored as Postgres enum types.
//!
//! Each enum serializes to the same `snake_case` value that the database
//! uses, so query-string filters, JSON bodies and rows all agree.

use serde::{Deserialize, Serialize};

/// Error returned when a string is not one of an enum's choices.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("\"{value}\" is not a valid choice.")]
pub struct InvalidChoice {
    /// The rejected input.
    pub value: String,
}

macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $pg:literal {
            $($(#[$vmeta:meta])* $variant:ident => ($value:literal, $label:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[cfg_attr(feature = "postgres", derive(sqlx::Type))]
        #[cfg_attr(feature = "postgres", sqlx(type_name = $pg, rename_all = "snake_case"))]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every choice, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The stored value.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value),+
                }
            }

            /// Human readable label.
            #[must_use]
            pub const fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = InvalidChoice;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok(Self::$variant),)+
                    _ => Err(InvalidChoice { value: s.to_owned() }),
                }
            }
        }
    };
}

choice_enum! {
    /// Product catalog category.
    ProductCategory, "storefront.product_category" {
        Orthodontics => ("orthodontics", "Orthodontics"),
        Cosmetic => ("cosmetic", "Cosmetic Dentistry"),
        Preventive => ("preventive", "Preventive Care"),
        Restorative => ("restorative", "Restorative Dentistry"),
        OralSurgery => ("oral_surgery", "Oral Surgery"),
    }
}

choice_enum! {
    /// Blog post publication status.
    #[derive(Default)]
    BlogStatus, "storefront.blog_status" {
        #[default]
        Draft => ("draft", "Draft"),
        Published => ("published", "Published"),
        /// Soft-deleted; hidden from every listing.
        Archived => ("archived", "Archived"),
    }
}

choice_enum! {
    /// Treatment requested when booking an appointment.
    AppointmentService, "storefront.appointment_service" {
        GeneralCheckup => ("general_checkup", "General Checkup"),
        Cleaning => ("cleaning", "Teeth Cleaning"),
        Filling => ("filling", "Dental Filling"),
        Extraction => ("extraction", "Tooth Extraction"),
        Crown => ("crown", "Dental Crown"),
        RootCanal => ("root_canal", "Root Canal"),
        Orthodontics => ("orthodontics", "Orthodontics"),
        Cosmetic => ("cosmetic", "Cosmetic Dentistry"),
        Emergency => ("emergency", "Emergency Care"),
        Other => ("other", "Other"),
    }
}

choice_enum! {
    /// Appointment lifecycle status.
    #[derive(Default)]
    AppointmentStatus, "storefront.appointment_status" {
        #[default]
        Pending => ("pending", "Pending"),
        Confirmed => ("confirmed", "Confirmed"),
        Cancelled => ("cancelled", "Cancelled"),
        Completed => ("completed", "Completed"),
    }
}
