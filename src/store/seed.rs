//! Initial catalog for a fresh store.

use chrono::Utc;
use ulid::Ulid;

use super::models::{Category, Order, OrderItem, OrderStatus, Product};

const PLACEHOLDER_IMAGE: &str = "https://placehold.co/600x600.png";

const CATEGORIES: [(&str, &str); 7] = [
    ("Mates de Calabaza", "mates-calabaza"),
    ("Mates de Algarrobo", "mates-algarrobo"),
    ("Mates de Acero", "mates-acero"),
    ("Bombillas", "bombillas"),
    ("Termos", "termos"),
    ("Yerberas", "yerberas"),
    ("Yerbas", "yerbas"),
];

// (name, description, price, image count, category, featured)
const PRODUCTS: [(&str, &str, u64, usize, &str, bool); 9] = [
    (
        "Mate Imperial de Lujo",
        "Experimenta la tradición con nuestro mate imperial, hecho a mano con virola de alpaca y cuero genuino. Cada pieza es única.",
        8500,
        2,
        "Mates de Calabaza",
        true,
    ),
    (
        "Mate Camionero Clásico",
        "El compañero ideal para tus viajes. Mate de calabaza forrado en cuero, resistente y de gran capacidad.",
        6200,
        1,
        "Mates de Calabaza",
        false,
    ),
    (
        "Mate de Algarrobo Torneado",
        "Diseño elegante y madera noble. El algarrobo le da un sabor especial a tus mates.",
        4800,
        1,
        "Mates de Algarrobo",
        true,
    ),
    (
        "Mate de Acero Inoxidable",
        "Moderno, práctico y eterno. No necesita curado y es fácil de limpiar.",
        5500,
        1,
        "Mates de Acero",
        false,
    ),
    (
        "Bombilla Pico de Loro",
        "Bombilla de alpaca con filtro de alta calidad, ideal para todo tipo de yerba.",
        3200,
        1,
        "Bombillas",
        true,
    ),
    (
        "Termo Stanley 1L",
        "El clásico. Mantiene la temperatura perfecta durante horas. Compañero infaltable.",
        25000,
        1,
        "Termos",
        false,
    ),
    (
        "Yerbera de Cuero",
        "Practicidad y estilo para llevar tu yerba a todos lados. Con pico vertedor.",
        4100,
        1,
        "Yerberas",
        false,
    ),
    (
        "Yerba Mate Canarias 1kg",
        "La preferida de los uruguayos, sin palo y con un sabor intenso y duradero.",
        3800,
        1,
        "Yerbas",
        false,
    ),
    (
        "Mate Torpedo Premium",
        "Forma ergonómica y cuero de alta calidad. Un mate para disfrutar todos los días.",
        7900,
        2,
        "Mates de Calabaza",
        true,
    ),
];

pub(super) fn categories() -> Vec<Category> {
    CATEGORIES
        .iter()
        .map(|(name, slug)| Category {
            id: Ulid::new().to_string(),
            name: (*name).to_string(),
            slug: (*slug).to_string(),
        })
        .collect()
}

pub(super) fn products() -> Vec<Product> {
    PRODUCTS
        .iter()
        .map(
            |(name, description, price, images, category, featured)| Product {
                id: Ulid::new().to_string(),
                name: (*name).to_string(),
                description: (*description).to_string(),
                price: *price,
                images: vec![PLACEHOLDER_IMAGE.to_string(); *images],
                category: (*category).to_string(),
                featured: *featured,
            },
        )
        .collect()
}

/// One pending online order so the back office is not empty on first run.
pub(super) fn orders(products: &[Product]) -> Vec<Order> {
    let items: Vec<OrderItem> = ["Mate Imperial de Lujo", "Bombilla Pico de Loro"]
        .iter()
        .filter_map(|name| products.iter().find(|product| product.name == *name))
        .map(|product| OrderItem {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            quantity: 1,
            price: product.price,
        })
        .collect();

    if items.is_empty() {
        return Vec::new();
    }

    let total = items.iter().map(|item| item.price).sum();
    vec![Order {
        id: Ulid::new().to_string(),
        customer_name: "Juan Perez".to_string(),
        customer_whatsapp: "+5491122334455".to_string(),
        customer_address: "Av. Corrientes 1234, CABA".to_string(),
        items,
        total,
        status: OrderStatus::Pending,
        created_at: Utc::now(),
        is_manual: false,
    }]
}
