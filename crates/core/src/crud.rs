//! CRUD synthesis for services declared without explicit methods.
//!
//! Both variants yield five methods per entity, in the order get, list,
//! create, update, delete.

use crate::inflector::{kebab_case, lower_camel_case, pluralize};
use crate::model::Method;
use crate::value::Value;

/// Plain CRUD methods, used by the legacy `service A, B with S` form.
pub fn crud_methods(entity: &str) -> Vec<Method> {
    crud(entity, None)
}

/// CRUD methods owned by `service`, each carrying an HTTP verb option with
/// the resource path (`/orders`, `/orders/{orderId}`).
pub fn crud_methods_for_service(entity: &str, service: &str) -> Vec<Method> {
    crud(entity, Some(service))
}

/// Collection path and item path for `entity`.
pub fn resource_paths(entity: &str) -> (String, String) {
    let collection = format!("/{}", kebab_case(&pluralize(&entity.to_lowercase())));
    let item = format!("{}/{{{}Id}}", collection, lower_camel_case(entity));
    (collection, item)
}

fn crud(entity: &str, service: Option<&str>) -> Vec<Method> {
    let (collection, item) = resource_paths(entity);
    let method = |name: String, verb: &str, path: &str| {
        let mut m = Method::new(name);
        if let Some(service) = service {
            m.service_name = Some(service.to_owned());
            m.add_option(verb, Value::from(path));
        }
        m
    };

    let mut get = method(format!("get{entity}"), "get", &item);
    get.param_id = Some("id".to_owned());
    get.return_type = Some(entity.to_owned());
    get.return_type_is_optional = true;

    let mut list = method(format!("list{}", pluralize(entity)), "get", &collection);
    list.return_type = Some(entity.to_owned());
    list.return_type_is_array = true;
    list.paginated = true;

    let mut create = method(format!("create{entity}"), "post", &collection);
    create.parameter = Some(entity.to_owned());
    create.return_type = Some(entity.to_owned());

    let mut update = method(format!("update{entity}"), "put", &item);
    update.param_id = Some("id".to_owned());
    update.parameter = Some(entity.to_owned());
    update.return_type = Some(entity.to_owned());
    update.return_type_is_optional = true;

    let mut delete = method(format!("delete{entity}"), "delete", &item);
    delete.param_id = Some("id".to_owned());

    vec![get, list, create, update, delete]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(methods: &[Method]) -> Vec<&str> {
        methods.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn synthesizes_five_methods_for_order() {
        let methods = crud_methods("Order");
        assert_eq!(
            names(&methods),
            vec!["getOrder", "listOrders", "createOrder", "updateOrder", "deleteOrder"]
        );
        let list = &methods[1];
        assert!(list.paginated && list.return_type_is_array);
        assert!(methods[0].return_type_is_optional);
        assert!(methods[3].return_type_is_optional);
        assert!(!methods[2].return_type_is_optional);
        assert_eq!(methods[4].return_type, None);
        assert!(methods.iter().all(|m| m.options.is_empty()));
    }

    #[test]
    fn service_variant_carries_routes() {
        let methods = crud_methods_for_service("OrderItem", "OrderService");
        assert_eq!(methods[0].options.get("get"), Some(&Value::from("/orderitems/{orderItemId}")));
        assert_eq!(methods[1].options.get("get"), Some(&Value::from("/orderitems")));
        assert_eq!(methods[2].options.get("post"), Some(&Value::from("/orderitems")));
        assert_eq!(methods[3].options.get("put"), Some(&Value::from("/orderitems/{orderItemId}")));
        assert_eq!(
            methods[4].options.get("delete"),
            Some(&Value::from("/orderitems/{orderItemId}"))
        );
        assert!(methods
            .iter()
            .all(|m| m.service_name.as_deref() == Some("OrderService") && m.options_list.len() == 1));
    }

    #[test]
    fn paths_use_kebab_plural() {
        assert_eq!(
            resource_paths("Category"),
            ("/categories".to_owned(), "/categories/{categoryId}".to_owned())
        );
    }

    #[test]
    fn synthesis_is_deterministic() {
        assert_eq!(
            crud_methods_for_service("Customer", "CustomerService"),
            crud_methods_for_service("Customer", "CustomerService")
        );
    }
}
