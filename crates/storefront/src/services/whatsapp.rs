//! Prefilled WhatsApp chat links to the store.

use std::fmt::Write as _;

use cupcake_core::{CartSnapshot, OrderId};

use crate::models::Cupcake;

const SUPPORT_MESSAGE: &str = "Olá!\nPreciso de ajuda com minha compra ou tenho uma dúvida sobre os cupcakes.\nPoderiam me atender, por favor? 😊";

const PASSWORD_RESET_MESSAGE: &str = "Olá!\nEu gostaria de redefinir minha senha no aplicativo de Cupcakes.\nPor favor, me ajude com o procedimento.\nObrigado! 😊";

/// `https://wa.me/{number}?text={message}` with the message URL-encoded.
#[must_use]
pub fn chat_url(number: &str, message: &str) -> String {
    format!("https://wa.me/{number}?text={}", urlencoding::encode(message))
}

/// Order confirmation listing each line and the total.
#[must_use]
pub fn order_confirmation(order_id: OrderId, snapshot: &CartSnapshot<Cupcake>) -> String {
    let mut message = format!("Olá! Gostaria de confirmar meu pedido nº {order_id}:\n\n");
    for line in &snapshot.lines {
        let _ = writeln!(
            message,
            "- {} (x{}): {}",
            line.item.name, line.quantity, line.subtotal
        );
    }
    let _ = write!(
        message,
        "\n*Total:* {}\n\nPor favor, me envie o endereço de entrega e a forma de pagamento.",
        snapshot.total
    );
    message
}

/// Link for general support questions.
#[must_use]
pub fn support_url(number: &str) -> String {
    chat_url(number, SUPPORT_MESSAGE)
}

/// Link asking the store to reset a password.
#[must_use]
pub fn password_reset_url(number: &str) -> String {
    chat_url(number, PASSWORD_RESET_MESSAGE)
}

#[cfg(test)]
mod tests {
    use cupcake_core::{Cart, CupcakeId, Price};

    use super::*;

    fn cupcake(id: i32, name: &str, cents: i64) -> Cupcake {
        Cupcake {
            id: CupcakeId::new(id),
            name: name.to_string(),
            description: String::new(),
            price: Price::from_cents(cents),
            image: String::new(),
            active: true,
        }
    }

    #[test]
    fn test_order_confirmation_lists_lines_and_total() {
        let mut cart = Cart::new();
        cart.add(CupcakeId::new(1), 3);
        cart.add(CupcakeId::new(2), 1);
        let catalog = vec![cupcake(1, "Baunilha", 500), cupcake(2, "Pistache", 1250)];
        let snapshot = cart.snapshot(&catalog);

        let message = order_confirmation(OrderId::new(42), &snapshot);
        assert_eq!(
            message,
            "Olá! Gostaria de confirmar meu pedido nº 42:\n\n\
             - Baunilha (x3): R$ 15.00\n\
             - Pistache (x1): R$ 12.50\n\
             \n*Total:* R$ 27.50\n\n\
             Por favor, me envie o endereço de entrega e a forma de pagamento."
        );
    }

    #[test]
    fn test_chat_url_encodes_message() {
        assert_eq!(
            chat_url("5511948083862", "Olá!\nTudo bem?"),
            "https://wa.me/5511948083862?text=Ol%C3%A1%21%0ATudo%20bem%3F"
        );
    }

    #[test]
    fn test_support_links() {
        assert!(support_url("5511").starts_with("https://wa.me/5511?text=Ol%C3%A1%21%0APreciso"));
        assert!(password_reset_url("5511").contains("redefinir%20minha%20senha"));
    }
}
