//! Shared test models.

use super::memory::InMemoryCodeModel;
use super::snapshot::{ClassSnapshot, FieldSnapshot, MethodSnapshot, ModelSnapshot};
use super::types::{
    Annotation, EntityKind, TypeRef, Visibility, FLOW_ACTION, FLOW_CONDITION, FLOW_TERMINAL,
};

/// A small layered shop application:
///
/// ```text
/// OrderFacade.submit ─► OrderService.placeOrder ─► OrderService.audit
///                              │                 ─► OrderRepository.save
///                              │                 ─► Logger.info (unresolved)
/// OrderServiceTest.testPlaceOrder ─┘
/// JpaOrderRepository.save ─► OrderMapper.toRow
/// ```
pub fn layered_snapshot() -> ModelSnapshot {
    let order = TypeRef::of("Order", "shop.entity.Order");

    let facade = ClassSnapshot::new("shop.api.OrderFacade", EntityKind::Class).method(
        MethodSnapshot::new("submit", 10)
            .param("order", order.clone())
            .calls("shop.service.OrderService#placeOrder(Order)", 11),
    );

    let service = ClassSnapshot::new("shop.service.OrderService", EntityKind::Class)
        .field(FieldSnapshot::new(
            "repository",
            TypeRef::of("OrderRepository", "shop.dataaccess.OrderRepository"),
            3,
        ))
        .method(MethodSnapshot::new("OrderService", 5).constructor())
        .method(
            MethodSnapshot::new("placeOrder", 10)
                .param("order", order.clone())
                .calls("shop.service.OrderService#audit(String)", 11)
                .calls("shop.dataaccess.OrderRepository#save(Order)", 12)
                .calls("java.util.logging.Logger#info(String)", 13),
        )
        .method(
            MethodSnapshot::new("getRepository", 20)
                .returns(TypeRef::of("OrderRepository", "shop.dataaccess.OrderRepository")),
        )
        .method(
            MethodSnapshot::new("audit", 30)
                .visibility(Visibility::Private)
                .param("message", TypeRef::new("String")),
        );

    let service_test = ClassSnapshot::new("shop.service.OrderServiceTest", EntityKind::Class)
        .path("/project/src/test/java/shop/service/OrderServiceTest.java")
        .method(
            MethodSnapshot::new("testPlaceOrder", 8)
                .calls("shop.service.OrderService#placeOrder(Order)", 9),
        );

    let repository = ClassSnapshot::new("shop.dataaccess.Repository", EntityKind::Interface);
    let order_repository =
        ClassSnapshot::new("shop.dataaccess.OrderRepository", EntityKind::Interface)
            .extends("shop.dataaccess.Repository")
            .method(MethodSnapshot::new("save", 5).param("order", order.clone()));
    let jpa_repository =
        ClassSnapshot::new("shop.dataaccess.JpaOrderRepository", EntityKind::Class)
            .extends("shop.dataaccess.OrderRepository")
            .method(
                MethodSnapshot::new("save", 7)
                    .param("order", order.clone())
                    .calls("shop.mapper.OrderMapper#toRow(Order)", 8),
            );

    let mapper = ClassSnapshot::new("shop.mapper.OrderMapper", EntityKind::Class).method(
        MethodSnapshot::new("toRow", 4)
            .param("order", order.clone())
            .returns(TypeRef::new("Row")),
    );

    let order_class = ClassSnapshot::new("shop.entity.Order", EntityKind::Class)
        .field(FieldSnapshot::new("id", TypeRef::primitive("long"), 3))
        .field(
            FieldSnapshot::new(
                "lines",
                TypeRef::collection_of("List<OrderLine>", "shop.entity.OrderLine"),
                4,
            )
            .annotated(Annotation::new("Size").with("min", "1").with("max", "10")),
        )
        .field(
            FieldSnapshot::new("customer", TypeRef::of("Customer", "shop.entity.Customer"), 5)
                .annotated(Annotation::new("NotNull")),
        )
        .field(FieldSnapshot::new(
            "status",
            TypeRef::of("OrderStatus", "shop.entity.OrderStatus"),
            6,
        ))
        .method(MethodSnapshot::new("getId", 10).returns(TypeRef::primitive("long")));

    let order_line = ClassSnapshot::new("shop.entity.OrderLine", EntityKind::Class)
        .field(FieldSnapshot::new("quantity", TypeRef::primitive("int"), 3));
    let customer = ClassSnapshot::new("shop.entity.Customer", EntityKind::Class)
        .field(FieldSnapshot::new("name", TypeRef::new("String"), 3));
    let status = ClassSnapshot::new("shop.entity.OrderStatus", EntityKind::Enum);

    ModelSnapshot {
        classes: vec![
            facade,
            service,
            service_test,
            repository,
            order_repository,
            jpa_repository,
            mapper,
            order_class,
            order_line,
            customer,
            status,
        ],
    }
}

pub fn layered_model() -> InMemoryCodeModel {
    InMemoryCodeModel::from_snapshot(&layered_snapshot())
}

/// The flow example: `save` validates, then creates or updates.
pub fn flow_service_model() -> InMemoryCodeModel {
    let class = "flow.FlowService";
    let flow_service = ClassSnapshot::new(class, EntityKind::Class)
        .method(
            MethodSnapshot::new("save", 8)
                .annotated(Annotation::new(FLOW_TERMINAL).with("value", "save entity"))
                .calls("flow.FlowService#validateEntity()", 9)
                .calls("flow.FlowService#isAlreadySaved()", 11)
                .calls("flow.FlowService#update()", 12)
                .calls("flow.FlowService#create()", 14),
        )
        .method(
            MethodSnapshot::new("validateEntity", 20)
                .visibility(Visibility::Private)
                .annotated(
                    Annotation::new(FLOW_CONDITION)
                        .with("value", "is entity valid")
                        .with("branch", "No")
                        .with("alternativeBranch", "Yes"),
                )
                .calls("flow.FlowService#isNotValid()", 21)
                .calls("flow.FlowService#createViolationException()", 22),
        )
        .method(
            MethodSnapshot::new("create", 28)
                .visibility(Visibility::Private)
                .annotated(
                    Annotation::new(FLOW_CONDITION)
                        .with("value", "is already saved")
                        .with("branch", "Yes"),
                )
                .annotated(Annotation::new(FLOW_TERMINAL).with("value", "create entity")),
        )
        .method(
            MethodSnapshot::new("update", 34)
                .visibility(Visibility::Private)
                .annotated(
                    Annotation::new(FLOW_CONDITION)
                        .with("value", "is already saved")
                        .with("branch", "no"),
                )
                .annotated(Annotation::new(FLOW_TERMINAL).with("value", "update entity")),
        )
        .method(
            MethodSnapshot::new("createViolationException", 40)
                .visibility(Visibility::Private)
                .annotated(Annotation::new(FLOW_TERMINAL).with("value", "display error message"))
                .calls("java.lang.RuntimeException#RuntimeException()", 41),
        )
        .method(
            MethodSnapshot::new("isNotValid", 44)
                .visibility(Visibility::Private)
                .returns(TypeRef::primitive("boolean"))
                .calls("java.util.Random#nextBoolean()", 45),
        )
        .method(
            MethodSnapshot::new("isAlreadySaved", 48)
                .visibility(Visibility::Private)
                .returns(TypeRef::primitive("boolean"))
                .calls("java.util.Random#nextBoolean()", 49),
        );

    InMemoryCodeModel::from_snapshot(&ModelSnapshot {
        classes: vec![flow_service],
    })
}

/// `m0` calls `m1` twice, `m1` calls `m2` twice, and so on down to
/// `m<levels>`. `m0` is the Terminal "start", the last method the Action
/// "end"; everything between is unmarked.
pub fn double_call_chain(levels: usize) -> InMemoryCodeModel {
    let mut class = ClassSnapshot::new("a.Chain", EntityKind::Class);
    for level in 0..=levels {
        let line = 10 * level as u32 + 1;
        let mut method = MethodSnapshot::new(format!("m{}", level), line);
        if level == 0 {
            method = method.annotated(Annotation::new(FLOW_TERMINAL).with("value", "start"));
        }
        if level == levels {
            method = method.annotated(Annotation::new(FLOW_ACTION).with("value", "end"));
        } else {
            let callee = format!("a.Chain#m{}()", level + 1);
            method = method.calls(callee.as_str(), line + 1).calls(callee.as_str(), line + 2);
        }
        class = class.method(method);
    }
    InMemoryCodeModel::from_snapshot(&ModelSnapshot {
        classes: vec![class],
    })
}
